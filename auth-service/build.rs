fn main() -> Result<(), Box<dyn std::error::Error>> {
    // auth-service PROVIDES AuthService (server implementation)
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(
            &["../proto/services/auth_service.proto"],
            &["../proto/services"],
        )?;

    Ok(())
}
