pub mod battle;
pub mod config;
pub mod group;
pub mod host;
pub mod rest;
pub mod stats;
