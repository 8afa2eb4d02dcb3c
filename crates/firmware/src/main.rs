//! Pendant recorder firmware - main entry point
//!
//! Hardware-only entry point for STM32WB55RG (Nucleo-WB55 wiring).
//!
//! Pin assignments:
//!   PB1  = LED red    (LD3, active high)
//!   PB0  = LED green  (LD2, active high)
//!   PB5  = LED blue   (LD1, active high)
//!   PC4  = Power button (SW1, active low, EXTI4)
//!   PC6  = VBUS sense through divider (EXTI6)
//!   PA8  = Haptic MOSFET gate
//!   PA9  = USART1 TX → companion
//!   PA10 = USART1 RX ← companion

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::exti::{Channel as _, ExtiInput};
use embassy_stm32::gpio::{AnyPin, Input, Level, Output, Pin as _, Pull, Speed};
use embassy_stm32::peripherals;
use embassy_stm32::usart::{self, BufferedUart, BufferedUartRx, BufferedUartTx};
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_sync::zerocopy_channel::Channel;
use embassy_time::{Delay, Duration, Timer};
use firmware::boot::BootConfig;
use firmware::bridge::{EncodedSender, PcmReceiver, PcmSender};
use firmware::drivers::{
    ButtonHandoff, ButtonWorker, GpioHaptic, GpioIndicator, PowerButton, VbusHandoff,
    VbusMonitor, VbusWatcher,
};
use firmware::{
    companion, Board, DeviceState, FrameSlots, Mailbox, MailboxCodec, MailboxMicrophone,
    MailboxTransport,
};
use platform::config::MIC_BUFFER_SAMPLES;
use platform::{EncodedFrame, NotFitted, PcmFrame, ResetCause};
use static_cell::StaticCell;

use defmt_rtt as _;
use panic_probe as _;

type Mutex = CriticalSectionRawMutex;
type Led = Output<'static, AnyPin>;
type Sense = ExtiInput<'static, AnyPin>;

type AppIndicator = GpioIndicator<Led, Led, Led>;
type AppBoard = Board<
    MailboxTransport<'static, Mutex>,
    MailboxCodec<'static, Mutex>,
    MailboxMicrophone<'static, Mutex>,
    NotFitted,
    PowerButton<'static, Mutex, Sense>,
    NotFitted,
    NotFitted,
    NotFitted,
    GpioHaptic<Led, Delay>,
    VbusMonitor<'static, Mutex, Sense>,
>;

/// IWDG period; the heartbeat pets it every second.
const WATCHDOG_TIMEOUT_US: u32 = 8_000_000;
const COMPANION_BAUD: u32 = 921_600;
const LINK_RETRY_MS: u64 = 100;

bind_interrupts!(struct Irqs {
    USART1 => usart::BufferedInterruptHandler<peripherals::USART1>;
});

static STATE: DeviceState = DeviceState::new();
static MAILBOX: Mailbox<Mutex> = Mailbox::new();
static BUTTON_HANDOFF: ButtonHandoff<Mutex, Sense> = Signal::new();
static VBUS_HANDOFF: VbusHandoff<Mutex, Sense> = Signal::new();

static MIC_PCM_BUF: StaticCell<[PcmFrame; 1]> = StaticCell::new();
static MIC_PCM: StaticCell<Channel<'static, Mutex, PcmFrame>> = StaticCell::new();
static CODEC_PCM_BUF: StaticCell<[PcmFrame; 1]> = StaticCell::new();
static CODEC_PCM: StaticCell<Channel<'static, Mutex, PcmFrame>> = StaticCell::new();
static ENCODED_BUF: StaticCell<[EncodedFrame; 1]> = StaticCell::new();
static ENCODED: StaticCell<Channel<'static, Mutex, EncodedFrame>> = StaticCell::new();
static UART_TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static UART_RX_BUF: StaticCell<[u8; 4096]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    defmt::info!("Pendant recorder firmware v{=str}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());

    // Reset flags survive until cleared; read them before anything can
    // reset again, then clear for the next boot.
    let csr = embassy_stm32::pac::RCC.csr().read().0;
    embassy_stm32::pac::RCC.csr().modify(|w| w.set_rmvf(true));
    let cause = ResetCause::from_rcc_csr(csr);
    if cause.is_watchdog() {
        defmt::warn!("reset cause: {} (0x{:08x})", cause.primary(), cause.bits());
    } else {
        defmt::info!("reset cause: {}", cause.primary());
    }

    let mut watchdog = IndependentWatchdog::new(p.IWDG, WATCHDOG_TIMEOUT_US);
    watchdog.unleash();

    // Frame slots: sampler → bridge, bridge → encoder, encoder → bridge.
    let mic_pcm = MIC_PCM.init(Channel::new(
        MIC_PCM_BUF.init([[0; MIC_BUFFER_SAMPLES]]),
    ));
    let (mic_pcm_tx, mic_pcm_rx) = mic_pcm.split();
    let codec_pcm = CODEC_PCM.init(Channel::new(
        CODEC_PCM_BUF.init([[0; MIC_BUFFER_SAMPLES]]),
    ));
    let (codec_pcm_tx, codec_pcm_rx) = codec_pcm.split();
    let encoded = ENCODED.init(Channel::new(ENCODED_BUF.init([EncodedFrame::new()])));
    let (encoded_tx, encoded_rx) = encoded.split();

    // Companion link
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = COMPANION_BAUD;
    let uart = match BufferedUart::new(
        p.USART1,
        Irqs,
        p.PA10,
        p.PA9,
        UART_TX_BUF.init([0; 512]),
        UART_RX_BUF.init([0; 4096]),
        uart_config,
    ) {
        Ok(uart) => uart,
        Err(_) => defmt::panic!("USART1 configuration rejected"),
    };
    let (uart_tx, uart_rx) = uart.split();
    spawner.must_spawn(link_tx_task(codec_pcm_rx, uart_tx));
    spawner.must_spawn(link_rx_task(mic_pcm_tx, encoded_tx, uart_rx));

    // Local parts
    let indicator = GpioIndicator::new(
        Output::new(p.PB1.degrade(), Level::Low, Speed::Low),
        Output::new(p.PB0.degrade(), Level::Low, Speed::Low),
        Output::new(p.PB5.degrade(), Level::Low, Speed::Low),
    );
    let button: Sense = ExtiInput::new(Input::new(p.PC4, Pull::Up).degrade(), p.EXTI4.degrade());
    let vbus: Sense = ExtiInput::new(Input::new(p.PC6, Pull::Down).degrade(), p.EXTI6.degrade());
    let haptic = Output::new(p.PA8.degrade(), Level::Low, Speed::Low);

    spawner.must_spawn(button_task(ButtonWorker::new(&BUTTON_HANDOFF, Delay, &STATE)));
    spawner.must_spawn(vbus_task(VbusWatcher::new(&VBUS_HANDOFF, &STATE)));

    let board = Board::new(
        MailboxTransport::new(&MAILBOX),
        MailboxCodec::new(&MAILBOX, codec_pcm_tx),
        MailboxMicrophone::new(&MAILBOX),
    )
    .with_button(PowerButton::new(button, &BUTTON_HANDOFF))
    .with_haptic(GpioHaptic::new(haptic, Delay))
    .with_usb(VbusMonitor::new(vbus, &VBUS_HANDOFF, &STATE));

    spawner.must_spawn(app_task(
        board,
        indicator,
        FrameSlots {
            pcm: mic_pcm_rx,
            encoded: encoded_rx,
        },
    ));

    // Heartbeat
    loop {
        Timer::after(Duration::from_secs(1)).await;
        watchdog.pet();
    }
}

#[embassy_executor::task]
async fn app_task(
    mut board: AppBoard,
    mut indicator: AppIndicator,
    slots: FrameSlots<'static, Mutex>,
) {
    let mut delay = Delay;
    let err = firmware::run(
        BootConfig::from_features(),
        &mut board,
        &mut indicator,
        &STATE,
        slots,
        &mut delay,
    )
    .await;

    defmt::error!("bring-up failed: {} (code {=i32})", err, err.code());
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

#[embassy_executor::task]
async fn button_task(worker: ButtonWorker<'static, Mutex, Sense, Delay>) {
    match worker.run().await {}
}

#[embassy_executor::task]
async fn vbus_task(watcher: VbusWatcher<'static, Mutex, Sense>) {
    match watcher.run().await {}
}

#[embassy_executor::task]
async fn link_tx_task(
    mut codec_pcm: PcmReceiver<'static, Mutex>,
    mut uart: BufferedUartTx<'static, peripherals::USART1>,
) {
    loop {
        match companion::run_tx(&MAILBOX, &mut codec_pcm, &mut uart).await {
            Ok(never) => match never {},
            Err(err) => defmt::warn!("companion tx: {}", err),
        }
        Timer::after(Duration::from_millis(LINK_RETRY_MS)).await;
    }
}

#[embassy_executor::task]
async fn link_rx_task(
    mut mic_pcm: PcmSender<'static, Mutex>,
    mut encoded: EncodedSender<'static, Mutex>,
    mut uart: BufferedUartRx<'static, peripherals::USART1>,
) {
    loop {
        match companion::run_rx(&MAILBOX, &mut mic_pcm, &mut encoded, &STATE, &mut uart).await {
            Ok(never) => match never {},
            Err(err) => defmt::warn!("companion rx: {}", err),
        }
        Timer::after(Duration::from_millis(LINK_RETRY_MS)).await;
    }
}
