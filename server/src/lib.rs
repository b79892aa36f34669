// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! HTTP API and SQLite persistence for the task board.
pub mod config;
pub mod database;
pub mod gateway;
pub mod handlers;
pub mod routes;
