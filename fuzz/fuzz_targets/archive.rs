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

use std::io::{Read, Seek, SeekFrom};
use tempfile::tempdir;
use ustar::{Archive, Error, Tree, BLOCK_SIZE};

fuzz_target!(|data: &[u8]| {
    // Walk the raw input, lenient and strict
    for verify in [false, true] {
        let mut archive = Archive::new(data);
        archive.set_verify_checksums(verify);
        loop {
            match archive.next_entry() {
                Ok(Some(entry)) => {
                    let header = entry.header();
                    if header.entry_type().is_content_bearing() {
                        assert_eq!(entry.size(), header.size());
                    } else {
                        assert_eq!(entry.size(), 0);
                    }
                    let _ = header.validate();
                    let _ = header.path();
                    let _ = header.link_name();
                    let _ = header.mode();
                }
                Ok(None) => break,
                Err(Error::ChecksumMismatch { .. }) => continue,
                Err(_) => break,
            }
        }
        assert!(archive.position() <= data.len() as u64);
        assert_eq!(archive.position() % BLOCK_SIZE as u64, 0);
    }

    // Browse it as a tree
    if let Ok(tree) = Tree::read(data) {
        for entry in tree.entries() {
            if let Ok(mut view) = tree.open(&entry.path()) {
                let _ = view.stat();
                let _ = view.read_dir();
                let mut buf = Vec::new();
                let _ = view.seek(SeekFrom::Start(0));
                let _ = view.read_to_end(&mut buf);
            }
        }
    }

    // Unpack into a scratch directory
    if let Ok(temp_dir) = tempdir() {
        let mut archive = Archive::new(data);
        let _ = archive.unpack(temp_dir.path());
    }
});
