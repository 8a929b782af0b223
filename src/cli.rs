use clap::{Parser, Subcommand, ValueEnum};

use crate::models::request::RequestKind;

/// Hostel management service
#[derive(Parser)]
#[command(name = "hostel", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to HOSTEL_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Review leave and visitor requests
    Requests {
        #[command(subcommand)]
        command: RequestCommands,
    },

    /// Work with signed passes
    Pass {
        #[command(subcommand)]
        command: PassCommands,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create an admin account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "HOSTEL_ADMIN_PASSWORD")]
        password: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Leave,
    Visitor,
}

impl From<KindArg> for RequestKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Leave => RequestKind::Leave,
            KindArg::Visitor => RequestKind::Visitor,
        }
    }
}

#[derive(Subcommand)]
pub enum RequestCommands {
    /// List pending requests, newest first
    List {
        #[arg(value_enum)]
        kind: KindArg,
    },
    /// Approve a pending request and print the pass token
    Approve {
        #[arg(value_enum)]
        kind: KindArg,
        request_id: String,
        /// Admin username recorded as the decider
        #[arg(long)]
        admin: String,
    },
    /// Reject a pending request
    Reject {
        #[arg(value_enum)]
        kind: KindArg,
        request_id: String,
        #[arg(long)]
        admin: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PassCommands {
    /// Verify a pass token and print its fields
    Verify { token: String },
}
