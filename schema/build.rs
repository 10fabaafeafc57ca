fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("src/proto")?;
    tonic_build::configure()
        .out_dir("src/proto")
        .compile(&["proto/dispatch.proto"], &["proto/"])?;
    Ok(())
}
