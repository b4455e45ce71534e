#![deny(clippy::all)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::todo)]
// #![warn(clippy::cargo)]
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]

#[tokio::main]
async fn main() {
    app::run().await;
}


pub mod cfg {
    mod app_settings;
    mod database_settings;
    mod server_settings;
    mod shopify_settings;

    pub use app_settings::*;
    pub use database_settings::*;
    pub use server_settings::*;
    pub use shopify_settings::*;
}

pub mod core {
    mod context;
    mod db;
    mod shop;

    pub use context::*;
    pub use db::*;
    pub use shop::*;
}

pub mod auth {
    mod oauth;
    mod state;

    pub use oauth::*;
    pub use state::*;
}

pub mod db {
    mod images;
    mod line_items;
    mod orders;
    mod shops;

    pub use images::*;
    pub use line_items::*;
    pub use orders::*;
    pub use shops::*;
}

pub mod shopify {
    pub mod dto;
    pub mod queries;

    mod client;
    mod error;

    pub use client::*;
    pub use dto::MailingAddress;
    pub use error::*;
}

pub mod services {
    pub mod demo;
    pub mod orders;
    pub mod sync;
}

pub mod middleware {
    pub mod rate_limit;
}

pub mod routes {
    pub mod auth;
    pub mod health;
    pub mod orders;
}

pub mod app {
    mod cli;
    mod migrations;
    mod router;
    mod server;

    pub use cli::*;
    pub use migrations::*;
    pub use router::*;
    pub use server::*;
}
