#![doc = "The `blogforge` library crate."]
#![doc = ""]
#![doc = "Domain models, slug generation, comment threading, authentication, routing"]
#![doc = "and error handling for the blog API. The server binary (`main.rs`) wires"]
#![doc = "these into an actix-web application."]

pub mod auth;
pub mod comment_tree;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod slug;
