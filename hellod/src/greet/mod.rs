/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

/// Format the greeting message for a name. Total over all string inputs.
pub fn say(name: &str) -> String {
    format!("Hello {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_name() {
        assert_eq!(say("Kelsey"), "Hello Kelsey");
    }

    #[test]
    fn empty_name() {
        assert_eq!(say(""), "Hello ");
    }
}
