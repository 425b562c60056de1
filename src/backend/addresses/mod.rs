//! Saved shipping addresses

pub mod db;

pub mod handlers;
