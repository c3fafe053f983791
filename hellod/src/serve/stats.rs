/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicI32, AtomicIsize, AtomicU64, Ordering};

#[derive(Default)]
pub struct HelloServerStats {
    online: AtomicIsize,

    conn_total: AtomicU64,
    handshake_failed_total: AtomicU64,
    task_total: AtomicU64,
    task_alive_count: AtomicI32,

    login_total: AtomicU64,
    login_failed_total: AtomicU64,
    say_total: AtomicU64,
    check_total: AtomicU64,
    check_not_found_total: AtomicU64,
    invalid_request_total: AtomicU64,
}

impl HelloServerStats {
    pub(crate) fn set_online(&self) {
        self.online.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_offline(&self) {
        self.online.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed) > 0
    }

    pub(crate) fn add_conn(&self) {
        self.conn_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_handshake_failed(&self) {
        self.handshake_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_task(&self) {
        self.task_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_alive_task(&self) {
        self.task_alive_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dec_alive_task(&self) {
        self.task_alive_count.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn add_login(&self) {
        self.login_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_login_failed(&self) {
        self.login_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_say(&self) {
        self.say_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_check(&self) {
        self.check_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_check_not_found(&self) {
        self.check_not_found_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_invalid_request(&self) {
        self.invalid_request_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_conn_total(&self) -> u64 {
        self.conn_total.load(Ordering::Relaxed)
    }

    pub fn get_handshake_failed_total(&self) -> u64 {
        self.handshake_failed_total.load(Ordering::Relaxed)
    }

    pub fn get_task_total(&self) -> u64 {
        self.task_total.load(Ordering::Relaxed)
    }

    pub fn get_alive_count(&self) -> i32 {
        self.task_alive_count.load(Ordering::Relaxed)
    }

    pub fn get_login_total(&self) -> u64 {
        self.login_total.load(Ordering::Relaxed)
    }

    pub fn get_login_failed_total(&self) -> u64 {
        self.login_failed_total.load(Ordering::Relaxed)
    }

    pub fn get_say_total(&self) -> u64 {
        self.say_total.load(Ordering::Relaxed)
    }

    pub fn get_check_total(&self) -> u64 {
        self.check_total.load(Ordering::Relaxed)
    }

    pub fn get_check_not_found_total(&self) -> u64 {
        self.check_not_found_total.load(Ordering::Relaxed)
    }

    pub fn get_invalid_request_total(&self) -> u64 {
        self.invalid_request_total.load(Ordering::Relaxed)
    }
}
