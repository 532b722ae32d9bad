#[macro_export]
macro_rules! cron_tasks {
    ($ctx:expr, $($t:path),* $(,)?) => {
        $({
            const TASK_NAME: &str = const_str::convert_ascii_case!(upper_camel, stringify!($t));
            let now = std::time::Instant::now();
            tracing::debug!(task = TASK_NAME, "Starting task");
            match ($t)($ctx).await {
                Ok(v) => tracing::debug!(task = TASK_NAME, elapsed = ?now.elapsed(), "Completed task with result {v:?}"),
                Err(e) => tracing::error!(task = TASK_NAME, "Error occurred in task: {e:?}"),
            }
        })*
    };
}
