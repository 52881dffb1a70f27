//! グローバル共有状態管理
//!
//! 割り込みとタスクの間で共有される状態を管理します。
//! アクチュエーションコアは割り込みからも触るため、blocking mutex
//! （クリティカルセクション）で保護します。

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use inverter_core::{ActuationCore, DutyVector, ThreePhaseCurrent};

use crate::port::TimerPort;

pub type Core = ActuationCore<TimerPort>;

/// アクチュエーションコア（初期化完了までNone）
pub static CORE: Mutex<CriticalSectionRawMutex, RefCell<Option<Core>>> =
    Mutex::new(RefCell::new(None));

/// 制御ティック通知（TIM1 update割り込み → 制御タスク）
pub static CONTROL_TICK: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// 最新の相電流（ADC割り込み → 外側の制御ループ）
pub static PHASE_CURRENTS: Signal<CriticalSectionRawMutex, ThreePhaseCurrent> = Signal::new();

/// デューティ指令とセクター（外側の制御ループが書き込む）
pub static DUTY_COMMAND: Mutex<CriticalSectionRawMutex, RefCell<(DutyVector, u16)>> =
    Mutex::new(RefCell::new((DutyVector::centered(), 2)));

/// コアが初期化済みならクロージャを実行
pub fn with_core<R>(f: impl FnOnce(&mut Core) -> R) -> Option<R> {
    CORE.lock(|cell| cell.borrow_mut().as_mut().map(f))
}
