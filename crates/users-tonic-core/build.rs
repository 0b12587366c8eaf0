/// Builds the gRPC client and server code for the `users.proto` definition
/// using `tonic-prost-build`.
///
/// The Protocol Buffer definitions in the `proto` directory are compiled into
/// Rust modules with gRPC bindings and written to the crate's `OUT_DIR`.
///
/// # Files and Paths
///
/// - Proto file: `proto/users.proto`
/// - Includes: `proto/`
/// - Descriptor set: `$OUT_DIR/users_descriptor.bin`, consumed by the server's
///   reflection service.
///
/// # Output
///
/// Generated code is exposed in Rust via:
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("users");
/// }
/// ```
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let descriptor_path = out_dir.join("users_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure().compile_with_config(
        config,
        &["proto/users.proto"],
        &["proto"],
    )?;

    println!("cargo:rerun-if-changed=proto/users.proto");
    Ok(())
}
