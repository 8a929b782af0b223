//! Rule-based assistant for the tenant portal.
//!
//! Messages are matched against a fixed knowledge base by keyword. Replies
//! can be prefixed with the tenant's own details and followed by alerts
//! about outstanding fees, unread messages and open complaints.

use once_cell::sync::Lazy;

use crate::models::room::Room;
use crate::models::tenant::Tenant;

struct Topic {
    name: &'static str,
    keywords: &'static [&'static str],
    /// `(trigger, reply)` pairs tried in order; the first entry is the default.
    responses: &'static [(&'static str, &'static str)],
}

static KNOWLEDGE_BASE: Lazy<Vec<Topic>> = Lazy::new(|| {
    vec![
        Topic {
            name: "mess",
            keywords: &["mess", "food", "meal", "breakfast", "lunch", "dinner", "menu"],
            responses: &[
                ("timing", "Mess timings: breakfast 7:30-9:30, lunch 12:30-2:30, dinner 7:30-9:30."),
                ("menu", "This week's menu is on the Mess page of your dashboard."),
                ("attendance", "Mark the meals you will take on the Mess page before 10 PM the previous day."),
            ],
        },
        Topic {
            name: "fees",
            keywords: &["fee", "fees", "payment", "pay", "rent", "due", "dues"],
            responses: &[
                ("status", "Your fee records and their status are in the 'My Fees' section."),
                ("how", "Fees can be paid at the office by cash, card or UPI. Keep the transaction id for your records."),
                ("late", "Fees unpaid after the due date are flagged as overdue. Talk to the office if you need more time."),
            ],
        },
        Topic {
            name: "complaints",
            keywords: &["complaint", "complain", "issue", "problem", "repair", "broken"],
            responses: &[
                ("submit", "To submit a complaint, open 'Submit Complaint' in your dashboard and describe the problem."),
                ("status", "Open complaints stay pending until the office marks them resolved."),
            ],
        },
        Topic {
            name: "leave",
            keywords: &["leave", "home", "outing", "vacation", "holiday"],
            responses: &[
                ("apply", "Apply for leave from the Leave page with your dates, destination and an emergency contact."),
                ("pass", "Once your leave is approved a signed leave pass appears under 'My Passes'."),
            ],
        },
        Topic {
            name: "visitors",
            keywords: &["visitor", "visitors", "guest", "guests", "parents", "visit"],
            responses: &[
                ("request", "Register a visitor from the Visitors page with their name, phone, date and entry time."),
                ("timing", "Visitors are allowed between 9 AM and 7 PM in the common area."),
                ("pass", "An approved visitor gets a signed pass that security scans at the gate."),
            ],
        },
        Topic {
            name: "rules",
            keywords: &["rule", "rules", "curfew", "policy", "allowed", "timing"],
            responses: &[
                ("curfew", "The gate closes at 10 PM. Late entry needs prior approval."),
                ("smoking", "Smoking is only allowed in rooms allotted to smokers."),
            ],
        },
        Topic {
            name: "wifi",
            keywords: &["wifi", "wi-fi", "internet", "network", "password"],
            responses: &[
                ("password", "The Wi-Fi password is posted at the front desk and changes monthly."),
                ("slow", "If the internet is slow, restart your device and raise a complaint if it continues."),
            ],
        },
        Topic {
            name: "laundry",
            keywords: &["laundry", "washing", "clothes", "iron"],
            responses: &[
                ("timing", "Laundry is collected on Monday and Thursday mornings and returned in two days."),
            ],
        },
        Topic {
            name: "contact",
            keywords: &["contact", "admin", "warden", "office", "help"],
            responses: &[
                ("message", "You can message the office from the Messages section of your dashboard."),
            ],
        },
    ]
});

const GREETINGS: &[&str] = &["hi", "hello", "hey", "namaste", "good morning", "good evening"];

const GREETING_REPLY: &str =
    "Hello! I can help with mess timings, fees, complaints, leave, visitors, Wi-Fi and laundry.";

const FALLBACK_REPLY: &str = "I'm not sure about that. Try asking about mess, fees, complaints, \
     leave or visitors, or message the office directly.";

/// Words that make a message about the tenant themselves.
const PERSONAL_WORDS: &[&str] = &["my", "me", "i", "profile", "dashboard"];

/// What the assistant knows about the tenant it is talking to.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: Tenant,
    pub room: Option<Room>,
    pub pending_fees: usize,
    pub pending_amount: f64,
    pub unread_messages: u64,
    pub pending_complaints: usize,
    pub admin_contact: String,
}

fn words(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// Knowledge-base reply for a single message.
pub fn respond(message: &str) -> String {
    let lowered = message.to_lowercase();
    let tokens = words(message);

    // Most keyword hits wins; ties go to the topic listed first.
    let mut best: Option<(usize, &Topic)> = None;
    for topic in KNOWLEDGE_BASE.iter() {
        let hits = topic
            .keywords
            .iter()
            .filter(|k| tokens.iter().any(|t| t == *k))
            .count();
        if hits > best.map_or(0, |(h, _)| h) {
            best = Some((hits, topic));
        }
    }

    if let Some((_, topic)) = best {
        let reply = topic
            .responses
            .iter()
            .find(|(trigger, _)| lowered.contains(trigger))
            .or_else(|| topic.responses.first())
            .map(|(_, reply)| *reply)
            .unwrap_or(FALLBACK_REPLY);
        tracing::debug!(topic = topic.name, "chatbot matched topic");
        return reply.to_string();
    }

    if GREETINGS.iter().any(|g| lowered.trim().starts_with(g)) {
        return GREETING_REPLY.to_string();
    }
    FALLBACK_REPLY.to_string()
}

/// One-paragraph summary of the tenant's own record.
pub fn contextual_info(ctx: &TenantContext) -> String {
    let mut lines = vec![format!("Name: {}", ctx.tenant.name)];
    match &ctx.room {
        Some(room) => lines.push(format!(
            "Room: {} (floor {}, {})",
            room.room_no,
            room.floor,
            if room.ac { "AC" } else { "non-AC" }
        )),
        None if ctx.tenant.room.is_empty() => lines.push("Room: not assigned yet".to_string()),
        None => lines.push(format!("Room: {}", ctx.tenant.room)),
    }
    if ctx.pending_fees > 0 {
        lines.push(format!(
            "Outstanding fees: {} (total {:.2})",
            ctx.pending_fees, ctx.pending_amount
        ));
    } else {
        lines.push("Fees: all paid".to_string());
    }
    lines.join("\n")
}

pub fn proactive_suggestions(ctx: &TenantContext) -> Vec<String> {
    let mut alerts = Vec::new();
    if ctx.pending_fees > 0 {
        alerts.push(format!("You have {} unpaid fee record(s)", ctx.pending_fees));
    }
    if ctx.unread_messages > 0 {
        alerts.push(format!("You have {} unread message(s)", ctx.unread_messages));
    }
    if ctx.pending_complaints > 0 {
        alerts.push(format!(
            "{} of your complaints are still pending",
            ctx.pending_complaints
        ));
    }
    alerts
}

/// Full chat reply: personal details first when the tenant asks about
/// themselves, alerts last for short queries.
pub fn reply(message: &str, ctx: &TenantContext) -> String {
    let tokens = words(message);
    let mut response = respond(message);

    if tokens.iter().any(|t| PERSONAL_WORDS.contains(&t.as_str())) {
        response = format!("{}\n\n{}", contextual_info(ctx), response);
    }

    let alerts = proactive_suggestions(ctx);
    if !alerts.is_empty() && tokens.len() < 3 {
        response.push_str("\n\nAlerts:\n");
        response.push_str(
            &alerts
                .iter()
                .map(|a| format!("- {a}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    response
}

/// Canned answers for the portal's quick-action buttons.
pub fn quick_action(action: &str, ctx: &TenantContext) -> String {
    match action {
        "mess_timing" => respond("mess timing"),
        "fee_status" => {
            "Check your fee status in the 'My Fees' section of your dashboard.".to_string()
        }
        "submit_complaint" => respond("submit complaint"),
        "room_info" => contextual_info(ctx),
        "contact_admin" => format!(
            "You can message the admin through the Messages section or reach {}.",
            ctx.admin_contact
        ),
        _ => "I can help you with that! Please ask me a specific question.".to_string(),
    }
}
