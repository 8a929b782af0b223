//! Office-side endpoints, mounted under `/api/admin` behind an admin session.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::models::request::RequestKind;
use crate::state::AppState;

pub mod attendance;
pub mod complaints;
pub mod fees;
pub mod insights;
pub mod messages;
pub mod passes;
pub mod requests;
pub mod residents;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(residents::dashboard))
        // Tenants & rooms
        .route(
            "/tenants",
            get(residents::list_tenants).post(residents::create_tenant),
        )
        .route(
            "/tenants/:id",
            get(residents::get_tenant)
                .put(residents::update_tenant)
                .delete(residents::delete_tenant),
        )
        .route("/rooms", get(residents::list_rooms).post(residents::create_room))
        .route("/rooms/available", get(residents::available_rooms))
        .route(
            "/rooms/:room_no",
            get(residents::get_room)
                .put(residents::update_room)
                .delete(residents::delete_room),
        )
        // Attendance & mess
        .route(
            "/attendance",
            get(attendance::attendance_on).post(attendance::mark_attendance),
        )
        .route("/attendance/range", get(attendance::attendance_range))
        .route("/attendance/stats", get(attendance::attendance_stats))
        .route("/attendance/poor", get(attendance::poor_attendance))
        .route("/mess/attendance", get(attendance::mess_attendance))
        .route(
            "/mess/menu",
            get(attendance::get_menu).put(attendance::save_menu),
        )
        // Fees
        .route("/fees", get(fees::list_fees).post(fees::add_fee))
        .route("/fees/:id", get(fees::get_fee))
        .route("/fees/:id/pay", post(fees::record_payment))
        .route("/fees/student/:id", get(fees::student_fees))
        // Messages
        .route("/messages", post(messages::compose))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/sent", get(messages::sent))
        .route(
            "/messages/:id",
            get(messages::view).delete(messages::delete),
        )
        .route("/messages/:id/reply", post(messages::reply))
        .route("/conversations", get(messages::conversations))
        .route(
            "/conversations/:student_id",
            get(messages::conversation).delete(messages::delete_conversation),
        )
        // Complaints
        .route("/complaints", get(complaints::list_complaints))
        .route("/complaints/:id/resolve", put(complaints::resolve_complaint))
        // Leave & visitor approvals
        .nest("/leave-requests", requests::router(RequestKind::Leave))
        .nest("/visitor-requests", requests::router(RequestKind::Visitor))
        // Passes
        .route("/passes/leave", post(passes::leave_pass))
        .route("/passes/visitor", post(passes::visitor_pass))
        .route("/passes/student/:id", get(passes::student_id_pass))
        .route("/passes/verify", post(passes::verify_pass))
        // Insights
        .route("/insights/recommend-room", post(insights::recommend_room))
        .route("/insights/roommates/:id", get(insights::roommates))
        .route("/insights/payment-risk/:id", get(insights::payment_risk))
        .route(
            "/insights/complaint-priority",
            post(insights::complaint_priority),
        )
        .route("/insights/mess-forecast", get(insights::mess_forecast))
        .route("/insights/attendance-trend", get(insights::attendance_trend))
}
