fn main() -> Result<(), Box<dyn std::error::Error>> {
    // notification-service PROVIDES NotificationService (server implementation)
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(
            &["../proto/services/notification_service.proto"],
            &["../proto/services"],
        )?;

    Ok(())
}
