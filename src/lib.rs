//! RunPod Monitor Bot Library
//!
//! A Telegram bot that watches RunPod GPU pods.
//!
//! This crate provides the core functionality for:
//! - Loading configuration and allow-lists from the environment
//! - Talking to the RunPod REST API
//! - Rendering instance reports as Telegram HTML
//! - Guiding users through pod creation
//! - Handling commands and inline buttons
//! - Pushing periodic reports to a notification chat

pub mod commands;
pub mod config;
pub mod provider;
pub mod report;
pub mod scheduler;
pub mod telegram;
pub mod wizard;
