//! Colloquy - Conversational Dispatch Engine
//!
//! This crate drives a single logical conversation through a sequence of
//! named states, each of which either emits output ("ask") or interprets
//! one user input ("listen"), transitioning after each step. It is the
//! reusable core beneath any chat surface.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
