// ============================================
// Job Scheduler - Фоновые задачи генерации
// ============================================
// Задачи выполняются в пуле Rayon. Готовый результат вместе с колбэком
// кладётся в очередь завершения, которую основной поток разбирает раз за тик.
// Мьютекс защищает только push/pop очереди, не сами вычисления.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;

/// Колбэк завершения, выполняется на потоке-потребителе
type Completion<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Ошибка фоновой задачи (паника в воркере)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobError {
    pub label: String,
    pub message: String,
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job '{}' panicked: {}", self.label, self.message)
    }
}

impl std::error::Error for JobError {}

struct Shared<C> {
    queue: Mutex<VecDeque<Completion<C>>>,
    in_flight: AtomicUsize,
    failed: AtomicUsize,
}

impl<C> Shared<C> {
    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Completion<C>>> {
        // В критической секции только push/pop владеющих значений
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Планировщик фоновых задач с очередью завершения.
///
/// `C` - контекст потребителя, который получают колбэки при `drain`.
pub struct JobScheduler<C> {
    pool: Arc<rayon::ThreadPool>,
    shared: Arc<Shared<C>>,
}

impl<C> Clone for JobScheduler<C> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: 'static> JobScheduler<C> {
    /// `num_threads` 0 = по числу ядер
    pub fn new(num_threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("terrain-worker-{}", i))
            .build()?;
        log::info!("Created terrain job pool with {} threads", pool.current_num_threads());

        Ok(Self {
            pool: Arc::new(pool),
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                in_flight: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
            }),
        })
    }

    /// Выполнить `producer` в фоне, затем поставить `on_complete` с результатом в очередь
    pub fn submit<R, P, F>(&self, label: impl Into<String>, producer: P, on_complete: F)
    where
        R: Send + 'static,
        P: FnOnce() -> R + Send + 'static,
        F: FnOnce(&mut C, R) + Send + 'static,
    {
        self.spawn(label.into(), producer, on_complete, None::<fn(&mut C, JobError)>);
    }

    /// Как `submit`, но при панике в очередь ставится `on_failed` (без результата)
    pub fn submit_or_else<R, P, F, E>(&self, label: impl Into<String>, producer: P, on_complete: F, on_failed: E)
    where
        R: Send + 'static,
        P: FnOnce() -> R + Send + 'static,
        F: FnOnce(&mut C, R) + Send + 'static,
        E: FnOnce(&mut C, JobError) + Send + 'static,
    {
        self.spawn(label.into(), producer, on_complete, Some(on_failed));
    }

    fn spawn<R, P, F, E>(&self, label: String, producer: P, on_complete: F, on_failed: Option<E>)
    where
        R: Send + 'static,
        P: FnOnce() -> R + Send + 'static,
        F: FnOnce(&mut C, R) + Send + 'static,
        E: FnOnce(&mut C, JobError) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        shared.in_flight.fetch_add(1, Ordering::SeqCst);

        self.pool.spawn_fifo(move || {
            let completion: Option<Completion<C>> = match catch_unwind(AssertUnwindSafe(producer)) {
                Ok(result) => Some(Box::new(move |ctx: &mut C| on_complete(ctx, result))),
                Err(panic) => {
                    let error = JobError { label, message: panic_message(panic.as_ref()) };
                    log::error!("{}", error);
                    shared.failed.fetch_add(1, Ordering::SeqCst);
                    on_failed.map(|handler| -> Completion<C> { Box::new(move |ctx: &mut C| handler(ctx, error)) })
                }
            };

            if let Some(completion) = completion {
                shared.lock_queue().push_back(completion);
            }
            shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Выполнить все готовые колбэки в порядке FIFO. Не ждёт незавершённые задачи.
    /// Возвращает число выполненных колбэков.
    /// Если колбэк паникует, оставшиеся возвращаются в начало очереди.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let mut pending = Requeue {
            shared: &self.shared,
            rest: std::mem::take(&mut *self.shared.lock_queue()),
        };
        let mut count = 0;
        while let Some(completion) = pending.rest.pop_front() {
            completion(ctx);
            count += 1;
        }
        count
    }

    /// Задачи, ещё не поставившие результат в очередь
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Готовые, но ещё не разобранные колбэки
    pub fn queued(&self) -> usize {
        self.shared.lock_queue().len()
    }

    pub fn failed(&self) -> usize {
        self.shared.failed.load(Ordering::SeqCst)
    }

    /// Ждать, пока все задачи не завершатся (для превью и тестов).
    /// false если истёк таймаут.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

/// Невыполненный остаток снимка очереди
struct Requeue<'a, C> {
    shared: &'a Shared<C>,
    rest: VecDeque<Completion<C>>,
}

impl<C> Drop for Requeue<'_, C> {
    fn drop(&mut self) {
        if self.rest.is_empty() {
            return;
        }
        // Раскрутка после паники колбэка: вернуть остаток перед новыми результатами
        let mut queue = self.shared.lock_queue();
        while let Some(completion) = self.rest.pop_back() {
            queue.push_front(completion);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
