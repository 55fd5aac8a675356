use std::env::args_os;
use std::io::stdout;
use std::path::Path;

use ustar::Builder;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut ar = Builder::new(stdout().lock());
    for arg in args_os().skip(1) {
        let path = Path::new(&arg);
        if path.is_dir() {
            let name = path.to_str().unwrap();
            ar.append_dir_all(name, path).unwrap();
        } else {
            ar.append_path(path).unwrap();
        }
    }
    ar.finish().unwrap();
}
