//! GreenMail container helpers.

use testcontainers::{
    GenericImage, ImageExt as _, core::IntoContainerPort as _, runners::AsyncRunner as _,
};

/// Starts a GreenMail container with a single user.
pub async fn start_greenmail(
    user: &str,
    password: &str,
) -> Result<testcontainers::ContainerAsync<GenericImage>, testcontainers::TestcontainersError> {
    GenericImage::new("greenmail/standalone", "2.1.2")
        .with_exposed_port(crate::IMAP_PORT.tcp())
        .with_wait_for(testcontainers::core::WaitFor::message_on_stdout(
            "Starting GreenMail API server at",
        ))
        .with_env_var(
            "GREENMAIL_OPTS",
            format!(
                "-Dgreenmail.setup.test.all -Dgreenmail.hostname=0.0.0.0 \
                 -Dgreenmail.users={user}:{password} -Dgreenmail.users.login=email"
            ),
        )
        .start()
        .await
}
