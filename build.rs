use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
struct Config {
    reader: Reader,
}

#[derive(Deserialize)]
struct Reader {
    chunk_buffer_size: usize,
    frame_buffer_size: usize,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 缓冲区配置
    println!(
        "cargo:rustc-env=MP3READER_CHUNK_BUFFER_SIZE={}",
        config.reader.chunk_buffer_size
    );
    println!(
        "cargo:rustc-env=MP3READER_FRAME_BUFFER_SIZE={}",
        config.reader.frame_buffer_size
    );
}
