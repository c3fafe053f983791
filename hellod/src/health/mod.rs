/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Serving status registry for the health checker.
//!
//! The registry is the single source of truth for per-service status. It is
//! only reachable through [`set_serving_status`] and [`check`]; statuses are
//! `Copy` values, so a reader can never observe a half written entry.

use std::collections::HashMap;
use std::sync::RwLock;

use foldhash::fast::FixedState;

use hello_proto::ServingStatus;

static STATUS_REGISTRY: RwLock<HashMap<String, ServingStatus, FixedState>> =
    RwLock::new(HashMap::with_hasher(FixedState::with_seed(0)));

/// Register a service name or update its current status.
pub fn set_serving_status(service: &str, status: ServingStatus) {
    let mut ht = STATUS_REGISTRY.write().unwrap();
    ht.insert(service.to_string(), status);
}

/// Current status of a service, `None` if the name was never registered.
pub fn check(service: &str) -> Option<ServingStatus> {
    let ht = STATUS_REGISTRY.read().unwrap();
    ht.get(service).copied()
}

pub fn snapshot() -> Vec<(String, ServingStatus)> {
    let ht = STATUS_REGISTRY.read().unwrap();
    let mut all: Vec<(String, ServingStatus)> =
        ht.iter().map(|(k, v)| (k.clone(), *v)).collect();
    all.sort_by(|a, b| a.0.cmp(&b.0));
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_name() {
        assert!(check("health-test-unregistered").is_none());
    }

    #[test]
    fn set_then_check() {
        set_serving_status("health-test-svc-a", ServingStatus::Serving);
        assert_eq!(check("health-test-svc-a"), Some(ServingStatus::Serving));

        set_serving_status("health-test-svc-a", ServingStatus::NotServing);
        assert_eq!(check("health-test-svc-a"), Some(ServingStatus::NotServing));
    }

    #[test]
    fn names_are_independent() {
        set_serving_status("health-test-svc-b", ServingStatus::Serving);
        set_serving_status("health-test-svc-c", ServingStatus::Unknown);
        assert_eq!(check("health-test-svc-b"), Some(ServingStatus::Serving));
        assert_eq!(check("health-test-svc-c"), Some(ServingStatus::Unknown));
    }
}
