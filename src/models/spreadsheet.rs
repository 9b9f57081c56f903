//! 表格行
//!
//! 以列名为键的一行原始数据，只在导入期间存在。

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetRow {
    cells: BTreeMap<String, String>,
}

impl SpreadsheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// 从 JSON 对象构造（表格导出为 JSON 时的形态）
    ///
    /// 数字和布尔值转成文本，null 视为空串；不是对象时返回 `None`。
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        let cells = object
            .iter()
            .map(|(key, cell)| {
                let text = match cell {
                    JsonValue::String(s) => s.clone(),
                    JsonValue::Null => String::new(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect();
        Some(Self { cells })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SpreadsheetRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
