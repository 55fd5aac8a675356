use std::io::stdin;

use ustar::{Archive, ByteSize};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut arch = Archive::new(stdin().lock());
    for file in arch.entries().unwrap() {
        let f = file.unwrap();
        let header = f.header();
        println!(
            "{:o} {:>10} {} {}",
            header.mode(),
            ByteSize(header.size()).to_string(),
            header.cksum(),
            f.path()
        );
    }
}
