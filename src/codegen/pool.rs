//! 编译单元的常量池
use std::collections::HashMap;
use tracing::debug;

use crate::codegen::op::ConstSlot;
use crate::error::{CloveResult, codegen_error};
use crate::value::Value;

/// 第 `index` 个常量的槽位；槽位号超出 `u32` 时报错
pub(crate) fn slot_at(index: usize) -> CloveResult<ConstSlot> {
    u32::try_from(index)
        .map(ConstSlot)
        .map_err(|_| codegen_error(format!("constant pool overflow: slot {} exceeds {}", index, u32::MAX)))
}

/// 去重的常量表。槽位按首次出现的顺序单调分配，从不回收。
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Value>,
    slots: HashMap<Value, ConstSlot>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取或创建常量对应的槽位
    pub fn intern(&mut self, value: &Value) -> CloveResult<ConstSlot> {
        if let Some(slot) = self.slots.get(value) {
            return Ok(*slot);
        }

        let slot = slot_at(self.entries.len())?;
        debug!(slot = %slot, value = %value, "allocate constant pool slot");
        self.entries.push(value.clone());
        self.slots.insert(value.clone(), slot);
        Ok(slot)
    }

    pub fn get(&self, slot: ConstSlot) -> Option<&Value> {
        self.entries.get(slot.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.entries
    }
}
