/*
 * Responsibility
 * - crate の module 構成
 *   - server 側: api / app / config / error / middleware / repos / state
 *   - client 側: client (store / sorting / controller / http)
 *   - 共有: domain / services
 */
pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
