pub mod server;

pub mod db;
pub mod services;
pub mod web;
