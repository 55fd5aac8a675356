use std::env::args;
use std::io::{copy, stdin, stdout};

use ustar::Archive;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let filename = args().nth(1).unwrap();
    let mut arch = Archive::new(stdin().lock());
    while let Some(mut f) = arch.next_entry().unwrap() {
        if f.path() == filename {
            copy(&mut f, &mut stdout()).unwrap();
            break;
        }
    }
}
