//! 后台定时任务
//!
//! 启动时调用一次 `spawn_all`，任务通过 `tokio::spawn` 独立运行

use crate::services::ClassService;

const CLASS_STATUS_INTERVAL_SECS: u64 = 60;

pub fn spawn_all(class_service: ClassService) {
    // 团课状态按时间推进（每分钟）
    {
        let svc = class_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.advance_by_clock().await {
                    Ok(n) if n > 0 => log::info!("Group classes advanced: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to advance group classes: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(CLASS_STATUS_INTERVAL_SECS))
                    .await;
            }
        });
    }
}
