//! Shopping cart

pub mod db;

pub mod handlers;
