#![allow(non_snake_case)]

pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod service;
pub mod tasks;
