//! 串行事件派发
//!
//! 事件在状态锁内按发生顺序入队，释放锁之后再派发。同一时刻只有一个线程在派发；
//! 回调里再触发的事件排在队尾，由正在派发的线程接着处理。回调执行期间不持有任何锁，
//! 因此回调可以自由读取或修改触发它的对象。

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

struct Queue<E> {
    pending: VecDeque<E>,
    running: bool,
}

pub struct SerialDispatcher<E> {
    queue: Mutex<Queue<E>>,
}

impl<E> Default for SerialDispatcher<E> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(Queue {
                pending: VecDeque::new(),
                running: false,
            }),
        }
    }
}

/// 回调 panic 时释放派发权，避免队列永久卡住
struct RunningGuard<'a, E> {
    dispatcher: &'a SerialDispatcher<E>,
}

impl<E> Drop for RunningGuard<'_, E> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.dispatcher.lock().running = false;
        }
    }
}

impl<E> SerialDispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Queue<E>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 事件入队，不派发
    pub fn push(&self, event: E) {
        self.lock().pending.push_back(event);
    }

    /// 派发队列中的全部事件
    ///
    /// 已有线程在派发时直接返回，入队的事件由那个线程处理
    pub fn drain(&self, mut deliver: impl FnMut(E)) {
        {
            let mut queue = self.lock();
            if queue.running {
                return;
            }
            queue.running = true;
        }

        let _guard = RunningGuard { dispatcher: self };
        loop {
            let next = {
                let mut queue = self.lock();
                match queue.pending.pop_front() {
                    Some(event) => event,
                    None => {
                        queue.running = false;
                        return;
                    }
                }
            };
            deliver(next);
        }
    }

    pub fn is_idle(&self) -> bool {
        let queue = self.lock();
        !queue.running && queue.pending.is_empty()
    }
}
