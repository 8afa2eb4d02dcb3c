//! Cortex-M exception handlers for the recorder firmware.
//!
//! The STM32WB55 application core is a Cortex-M4F. It raises a HardFault on
//! bus faults, usage faults escalated by a disabled handler, illegal
//! instructions and stack overflow into the CPU2 shared SRAM guard.
//!
//! The `#[cortex_m_rt::exception]` attribute requires ARM target intrinsics
//! and is therefore gated behind `#[cfg(feature = "hardware")]`.

#![allow(clippy::doc_markdown)]

/// HardFault exception handler (hardware target only).
///
/// Reports the stacked exception frame address over RTT, then halts through
/// the defmt panic path. The status light keeps whatever it last showed.
///
/// # Safety
///
/// Must never return; returning from a HardFault handler is undefined
/// behaviour on Cortex-M. The `-> !` return type enforces this.
#[cfg(feature = "hardware")]
#[cortex_m_rt::exception]
#[allow(unsafe_code)]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    defmt::panic!(
        "HardFault at PC 0x{:08X} (frame 0x{:08X})",
        ef.pc(),
        ef as *const _ as u32
    );
}
