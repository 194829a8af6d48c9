use std::{io::Write, sync::{Mutex, OnceLock}};

use anyhow::{Result, anyhow};
use comfy_table::Table;
use flexi_logger::{DeferredNow, Duplicate, FileSpec, LoggerHandle, style};
use log::Record;
use serde::Serialize;

/// 日志句柄，程序运行期间保持存活
///
/// 只由可执行程序通过 `init_logger` 设置；库代码只使用 `log` 宏。
pub static LOGGER: OnceLock<Mutex<LoggerHandle>> = OnceLock::new();

pub fn log_format(w: &mut dyn Write, _now: &mut DeferredNow, record: &Record) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(
        w,
        "{} {}",
        style(level).paint(level.to_string()[..1].to_string()),
        style(level).paint(record.args().to_string())
    )
}

/// 初始化日志：写入 logs/{app}.log 并同时输出到 stderr
///
/// 每个进程只能调用一次，由 `capexp` 的 main 在读取配置后调用，
/// 再次调用返回错误。`spec` 为 flexi_logger 的级别字符串，如 "info"。
pub fn init_logger(app: &str, spec: &str) -> Result<()> {
    let handle = flexi_logger::Logger::try_with_str(spec)?
        .format_for_stderr(log_format)
        .log_to_file(FileSpec::default().directory("logs").basename(app))
        .duplicate_to_stderr(Duplicate::All)
        .start()?;
    LOGGER
        .set(Mutex::new(handle))
        .map_err(|_| anyhow!("Logger init failed"))?;
    Ok(())
}

/// 把一组可序列化的记录转成表格，字段名作为表头
pub fn make_table<T: Serialize>(data: &[T]) -> Result<Table> {
    let mut table = Table::new();
    table.set_truncation_indicator("...");
    let mut has_headers = false;
    for row in data {
        let value = serde_json::to_value(row)?;
        let object = value.as_object().ok_or_else(|| anyhow!("表格行必须是结构体"))?;
        if !has_headers {
            table.set_header(object.keys());
            has_headers = true;
        }
        table.add_row(object.values().map(cell_text));
    }
    Ok(table)
}

/// 字符串不带引号，数组压成一行
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(x) if n.is_f64() => format!("{x:.4}"),
            _ => n.to_string()
        },
        other => other.to_string()
    }
}

/// 按 key 升序的 argsort，相同 key 保持下标顺序
pub fn stable_argsort<T: PartialOrd>(keys: &[T]) -> Vec<usize> {
    let mut index: Vec<usize> = (0..keys.len()).collect();
    index.sort_by(|a, b| keys[*a].partial_cmp(&keys[*b]).unwrap_or(std::cmp::Ordering::Equal));
    index
}

/// 按字典序列出所有 0 <= x_j <= caps[j] 且 sum(x) = total 的向量
pub fn bounded_compositions(total: u32, caps: &[u32]) -> Vec<Vec<u32>> {
    let c = caps.len();
    // suffix[j] = caps[j..] 之和
    let mut suffix = vec![0u64; c + 1];
    for j in (0..c).rev() {
        suffix[j] = suffix[j + 1] + caps[j] as u64;
    }
    let mut result = Vec::new();
    if suffix[0] < total as u64 {
        return result;
    }
    if c == 0 {
        if total == 0 {
            result.push(Vec::new());
        }
        return result;
    }

    // 显式栈上的下标 j 和当前前缀
    let mut current = vec![0u32; c];
    let mut stack: Vec<(usize, u32, u32)> = vec![(0, 0, total)];
    while let Some((j, x, remain)) = stack.pop() {
        if x > caps[j].min(remain) {
            continue;
        }
        // 下一个兄弟先压栈，保证字典序
        stack.push((j, x + 1, remain));
        if (remain - x) as u64 > suffix[j + 1] {
            continue;
        }
        current[j] = x;
        if j + 1 == c {
            if remain == x {
                result.push(current.clone());
            }
        } else {
            stack.push((j + 1, 0, remain - x));
        }
    }
    result
}
