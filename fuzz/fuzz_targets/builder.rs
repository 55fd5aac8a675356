// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![no_main]

use libfuzzer_sys::fuzz_target;

use std::str;
use ustar::{Archive, Builder, FileAttrs};

fuzz_target!(|data: &[u8]| {
    // Skip this iteration when data is not enough
    if data.len() < 16 {
        return;
    }

    // Carve a name, a mode and a body out of the input
    let split = usize::from(data[0]) % (data.len() - 8) + 8;
    let name = match str::from_utf8(&data[8..split]) {
        Ok(name) => name.to_string(),
        Err(_) => "default_name".to_string(),
    };
    let mode = u32::from_le_bytes([data[1], data[2], data[3], 0]);
    let mtime = i64::from(i32::from_le_bytes([data[4], data[5], data[6], data[7]]));
    let attrs = FileAttrs {
        mode,
        mtime,
        ..FileAttrs::default()
    };
    let body = &data[split..];

    let mut builder = Builder::new(Vec::new());
    let appended = builder.append_data(&name, &attrs, body).is_ok();
    let bytes = match builder.into_inner() {
        Ok(bytes) => bytes,
        Err(_) => return,
    };

    // Whatever was written must read back
    let mut archive = Archive::new(&bytes[..]);
    archive.set_verify_checksums(true);
    if appended {
        let entry = archive.next_entry().unwrap().unwrap();
        assert_eq!(entry.path(), name);
        if entry.header().entry_type().is_content_bearing() {
            assert_eq!(entry.body(), body);
        }
        assert_eq!(entry.header().mode() & 0o7777, mode & 0o6777);
    }
    assert!(archive.next_entry().unwrap().is_none());
});
