mod client;
mod helper;
mod html_parsing;

pub use client::Client;
