// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use docket::validation::{format, is_expired, is_identifier, suggest_description, truncate_display, validate};
use docket::FileRecord;

#[derive(Arbitrary, Debug)]
struct Input {
    description: String,
    extension: String,
    expiration: String,
    limit: u8,
}

fuzz_target!(|input: Input| {
    let candidate = FileRecord::new(input.description.clone(), input.extension)
        .with_expiration(input.expiration);
    let formatted = format(&candidate);

    if validate(&formatted).is_ok() {
        assert!(is_identifier(&formatted.description));
        assert!(!formatted.extension.is_empty());
        assert_eq!(formatted.extension, formatted.extension.to_uppercase());
    }
    let _ = is_expired(&formatted);

    let suggestion = suggest_description(&input.description);
    assert!(suggestion.is_empty() || is_identifier(&suggestion));

    let short = truncate_display(&input.description, input.limit as usize);
    assert!(short.chars().count() <= input.limit as usize + 3);
});
