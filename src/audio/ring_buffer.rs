//! 定长字节环形缓冲区
//!
//! 设计要点：
//! - 零分配：存储在创建时一次性分配，之后永不扩容
//! - 无内部锁：调用方持有 pacer 的共享锁后才能访问
//! - 内存锁定：可选 mlock 防止 page fault
//!
//! 不变量：`0 <= available <= capacity`，
//! `write_pos == (read_pos + available) mod capacity`

use crate::pacer::PacerError;

/// 字节环形缓冲区
pub struct RingBuffer {
    storage: Box<[u8]>,
    write_pos: usize,
    read_pos: usize,
    available: usize,

    // 是否已锁定内存
    memory_locked: bool,
}

impl RingBuffer {
    /// 创建指定容量（字节）的 Ring Buffer
    ///
    /// 分配失败时返回 `PacerError::Allocation`，不会 abort
    pub fn new(capacity: usize) -> Result<Self, PacerError> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| PacerError::Allocation { bytes: capacity })?;
        storage.resize(capacity, 0u8);

        Ok(Self {
            storage: storage.into_boxed_slice(),
            write_pos: 0,
            read_pos: 0,
            available: 0,
            memory_locked: false,
        })
    }

    /// 零容量缓冲区，用于关闭后释放存储
    pub fn empty() -> Self {
        Self {
            storage: Box::default(),
            write_pos: 0,
            read_pos: 0,
            available: 0,
            memory_locked: false,
        }
    }

    /// 锁定缓冲区内存，防止被换页
    ///
    /// 消费线程按 10ms 节拍运行，page fault 会直接变成时序抖动。
    /// 返回是否成功锁定
    pub fn lock_memory(&mut self) -> bool {
        if self.memory_locked {
            return true;
        }
        if self.storage.is_empty() {
            return false;
        }

        #[cfg(unix)]
        {
            let ptr = self.storage.as_ptr() as *const libc::c_void;
            let len = self.storage.len();
            let result = unsafe { libc::mlock(ptr, len) };

            if result == 0 {
                self.memory_locked = true;
                log::debug!("Ring buffer memory locked: {} bytes", len);
            } else {
                log::warn!(
                    "Failed to lock ring buffer memory: {}",
                    std::io::Error::last_os_error()
                );
            }
        }

        self.memory_locked
    }

    /// 解锁缓冲区内存
    pub fn unlock_memory(&mut self) {
        if !self.memory_locked {
            return;
        }

        #[cfg(unix)]
        unsafe {
            libc::munlock(self.storage.as_ptr() as *const libc::c_void, self.storage.len());
        }

        self.memory_locked = false;
        log::debug!("Ring buffer memory unlocked");
    }

    /// 写入字节（生产者调用）
    ///
    /// 前置条件：调用方已确认 `data.len() <= free_space()`。
    /// 跨越末尾时分两段拷贝
    pub fn write(&mut self, data: &[u8]) {
        debug_assert!(
            data.len() <= self.free_space(),
            "ring buffer overflow: {} bytes into {} free",
            data.len(),
            self.free_space()
        );
        let len = data.len().min(self.free_space());
        if len == 0 {
            return;
        }

        let first = len.min(self.capacity() - self.write_pos);
        self.storage[self.write_pos..self.write_pos + first].copy_from_slice(&data[..first]);
        if first < len {
            self.storage[..len - first].copy_from_slice(&data[first..len]);
        }

        self.write_pos = self.wrap(self.write_pos + len);
        self.available += len;
    }

    /// 消费字节（消费者调用）
    ///
    /// 只推进读指针，不拷贝数据：模拟设备把音频"播放"掉。
    /// 返回实际消费的字节数（不超过 available）
    pub fn consume(&mut self, len: usize) -> usize {
        let len = len.min(self.available);
        self.read_pos = self.wrap(self.read_pos + len);
        self.available -= len;
        len
    }

    /// 拷贝最旧的数据到 `output`，不消费
    ///
    /// 返回拷贝的字节数
    pub fn peek_into(&self, output: &mut [u8]) -> usize {
        let len = output.len().min(self.available);
        let first = len.min(self.capacity() - self.read_pos);
        output[..first].copy_from_slice(&self.storage[self.read_pos..self.read_pos + first]);
        if first < len {
            output[first..len].copy_from_slice(&self.storage[..len - first]);
        }
        len
    }

    /// 清空缓冲区，读写指针归零
    pub fn reset(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.available = 0;
    }

    /// 获取当前可读字节数
    #[inline]
    pub fn available(&self) -> usize {
        self.available
    }

    /// 获取当前可写空间
    #[inline]
    pub fn free_space(&self) -> usize {
        self.capacity() - self.available
    }

    /// 获取容量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// 获取缓冲区填充百分比（用于监控）
    #[inline]
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity() == 0 {
            return 0.0;
        }
        self.available as f64 / self.capacity() as f64
    }

    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    #[inline]
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    // pos 来自 [0, capacity) 加上不超过 capacity 的增量
    #[inline]
    fn wrap(&self, pos: usize) -> usize {
        if pos >= self.capacity() {
            pos - self.capacity()
        } else {
            pos
        }
    }
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        self.unlock_memory();
    }
}
