use dockprobe::{run, DockerEnv};
use std::io;

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    env_logger::init();

    let env = DockerEnv::from_process();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // The report already says whether we succeeded; either way we exit 0.
    run(&env, &mut out).await?;
    Ok(())
}
