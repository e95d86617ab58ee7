use std::path::Path;

use anyhow::Result;
use mcq_exam_client::app::App;
use mcq_exam_client::config::Config;
use mcq_exam_client::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置：带参数时读 TOML 配置文件，否则读环境变量
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_toml_file(Path::new(&path)).await?,
        None => Config::from_env(),
    };

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
