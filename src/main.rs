use std::path::Path;

use anyhow::Result;
use exam_draft_composer::utils::logging;
use exam_draft_composer::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：指定了配置文件就读文件，否则读环境变量
    let config = match std::env::var("EXAM_CONFIG_FILE") {
        Ok(path) => Config::from_file(Path::new(&path))?,
        Err(_) => Config::from_env()?,
    };

    // 初始化日志
    logging::init(config.verbose_logging)?;

    // 初始化并运行应用
    let stats = App::initialize(config).await?.run().await?;

    if stats.exam_id.is_none() {
        anyhow::bail!("考试未保存");
    }
    Ok(())
}
