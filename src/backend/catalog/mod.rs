//! Catalog of products and supplies

pub mod db;

pub mod handlers;
