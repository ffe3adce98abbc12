fn main() -> Result<(), Box<dyn std::error::Error>> {
    // chat-service PROVIDES ChatService (server implementation)
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(
            &["../proto/services/chat_service.proto"],
            &["../proto/services"],
        )?;

    Ok(())
}
