//! Compiles the helper service contract into tonic clients and servers.
//!
//! The server side is generated too so tests can stand up an in-process
//! helper on a local socket.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protoc = protoc_bin_vendored::protoc_bin_path().map_err(|e| e.to_string())?;
    // SAFETY: build scripts are single-threaded.
    unsafe {
        std::env::set_var("PROTOC", protoc);
    }

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/filesystem.proto", "proto/smb.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/filesystem.proto");
    println!("cargo:rerun-if-changed=proto/smb.proto");
    Ok(())
}
