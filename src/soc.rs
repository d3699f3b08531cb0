//! Address map of the UberClock SoC build.
//!
//! The memory windows follow the SoC description: `main_ram` at the LiteX
//! default origin, UberDDR3 as an uncached side memory at `0xA000_0000`
//! spanning 256 MiB. The CSR offsets below are a placeholder layout in the
//! order LiteX assigns CSR banks (one register per 32-bit word, banks 2 KiB
//! apart) and must be regenerated against the real gateware before use on
//! hardware.
#![allow(dead_code)]

pub const CSR_BASE: usize = 0xF000_0000;
pub const MAIN_RAM_BASE: usize = 0x4000_0000;

pub mod ctrl {
    pub const BASE: usize = super::CSR_BASE;
    pub const RESET: usize = BASE + 0x00;
    pub const SCRATCH: usize = BASE + 0x04;
    pub const BUS_ERRORS: usize = BASE + 0x08;
}

pub mod uart {
    pub const BASE: usize = super::CSR_BASE + 0x1000;
    pub const RXTX: usize = BASE + 0x00;
    pub const TXFULL: usize = BASE + 0x04;
    pub const RXEMPTY: usize = BASE + 0x08;
    pub const EV_STATUS: usize = BASE + 0x0c;
    pub const EV_PENDING: usize = BASE + 0x10;
    pub const EV_ENABLE: usize = BASE + 0x14;
    pub const TXEMPTY: usize = BASE + 0x18;
    pub const RXFULL: usize = BASE + 0x1c;
}

/// Register layout shared by `timer0` and `timer1`.
pub mod timer {
    pub const LOAD: usize = 0x00;
    pub const RELOAD: usize = 0x04;
    pub const EN: usize = 0x08;
    pub const UPDATE_VALUE: usize = 0x0c;
    pub const VALUE: usize = 0x10;
    pub const EV_STATUS: usize = 0x14;
    pub const EV_PENDING: usize = 0x18;
    pub const EV_ENABLE: usize = 0x1c;
}

pub const TIMER0_BASE: usize = CSR_BASE + 0x1800;
pub const TIMER1_BASE: usize = CSR_BASE + 0x2000;

pub mod leds {
    pub const OUT: usize = super::CSR_BASE + 0x2800;
}

/// Clock-domain crossing block in front of the UberClock CSRs.
pub mod cfg_link {
    pub const COMMIT: usize = super::CSR_BASE + 0x3000;
}

/// "channel-down" event manager.
pub mod evm {
    pub const BASE: usize = super::CSR_BASE + 0x3800;
    pub const STATUS: usize = BASE + 0x00;
    pub const PENDING: usize = BASE + 0x04;
    pub const ENABLE: usize = BASE + 0x08;
    pub const INTERRUPT: usize = 3;
}

/// UberClock datapath registers (`main_*` in the generated header).
pub mod main {
    pub const BASE: usize = super::CSR_BASE + 0x4000;
    pub const PHASE_INC_NCO: usize = BASE + 0x00;
    pub const PHASE_INC_DOWN_1: usize = BASE + 0x04;
    pub const PHASE_INC_DOWN_2: usize = BASE + 0x08;
    pub const PHASE_INC_DOWN_3: usize = BASE + 0x0c;
    pub const PHASE_INC_DOWN_4: usize = BASE + 0x10;
    pub const PHASE_INC_DOWN_5: usize = BASE + 0x14;
    pub const PHASE_INC_CPU: usize = BASE + 0x18;
    pub const INPUT_SELECT: usize = BASE + 0x1c;
    pub const UPSAMPLER_INPUT_MUX: usize = BASE + 0x20;
    pub const GAIN1: usize = BASE + 0x24;
    pub const GAIN2: usize = BASE + 0x28;
    pub const GAIN3: usize = BASE + 0x2c;
    pub const GAIN4: usize = BASE + 0x30;
    pub const GAIN5: usize = BASE + 0x34;
    pub const OUTPUT_SELECT_CH1: usize = BASE + 0x38;
    pub const OUTPUT_SELECT_CH2: usize = BASE + 0x3c;
    pub const FINAL_SHIFT: usize = BASE + 0x40;
    pub const CAP_ENABLE: usize = BASE + 0x44;
    pub const CAP_BEATS: usize = BASE + 0x48;
    pub const DAC1_DATA: usize = BASE + 0x4c;
    pub const DAC1_WRT_EN: usize = BASE + 0x50;
    pub const DAC2_DATA: usize = BASE + 0x54;
    pub const DAC2_WRT_EN: usize = BASE + 0x58;
    pub const CORDIC_PHASE: usize = BASE + 0x5c;

    /// Downconversion phase increments, channel 1 first.
    pub const PHASE_INC_DOWN: [usize; 5] = [
        PHASE_INC_DOWN_1,
        PHASE_INC_DOWN_2,
        PHASE_INC_DOWN_3,
        PHASE_INC_DOWN_4,
        PHASE_INC_DOWN_5,
    ];
    pub const GAIN: [usize; 5] = [GAIN1, GAIN2, GAIN3, GAIN4, GAIN5];
}

/// UberDDR3 controller and its S2MM engine.
pub mod ubddr3 {
    pub const BASE: usize = super::CSR_BASE + 0x4800;
    pub const CALIB_DONE: usize = BASE + 0x00;
    pub const DMA_REQ: usize = BASE + 0x04;
    pub const DMA_BUSY: usize = BASE + 0x08;
    pub const DMA_ERR: usize = BASE + 0x0c;
    pub const DMA_INC: usize = BASE + 0x10;
    pub const DMA_SIZE: usize = BASE + 0x14;
    pub const DMA_ADDR0: usize = BASE + 0x18;
    pub const DMA_ADDR1: usize = BASE + 0x1c;
    pub const RAMP_LEN: usize = BASE + 0x20;

    pub const MEM_BASE: usize = 0xA000_0000;
    pub const MEM_SIZE: usize = 0x1000_0000;
}

/// LiteEth MAC, SRAM-backed with two RX and two TX slots.
pub mod ethmac {
    pub const BASE: usize = super::CSR_BASE + 0x5000;
    pub const SRAM_WRITER_SLOT: usize = BASE + 0x00;
    pub const SRAM_WRITER_LENGTH: usize = BASE + 0x04;
    pub const SRAM_WRITER_ERRORS: usize = BASE + 0x08;
    pub const SRAM_WRITER_EV_STATUS: usize = BASE + 0x0c;
    pub const SRAM_WRITER_EV_PENDING: usize = BASE + 0x10;
    pub const SRAM_WRITER_EV_ENABLE: usize = BASE + 0x14;
    pub const SRAM_READER_START: usize = BASE + 0x18;
    pub const SRAM_READER_READY: usize = BASE + 0x1c;
    pub const SRAM_READER_LEVEL: usize = BASE + 0x20;
    pub const SRAM_READER_SLOT: usize = BASE + 0x24;
    pub const SRAM_READER_LENGTH: usize = BASE + 0x28;
    pub const SRAM_READER_EV_STATUS: usize = BASE + 0x2c;
    pub const SRAM_READER_EV_PENDING: usize = BASE + 0x30;
    pub const SRAM_READER_EV_ENABLE: usize = BASE + 0x34;

    pub const MEM_BASE: usize = 0x8000_0000;
    pub const RX_SLOTS: usize = 2;
    pub const TX_SLOTS: usize = 2;
    pub const SLOT_SIZE: usize = 2048;

    pub const fn rx_slot(slot: usize) -> usize {
        MEM_BASE + slot * SLOT_SIZE
    }

    pub const fn tx_slot(slot: usize) -> usize {
        MEM_BASE + (RX_SLOTS + slot) * SLOT_SIZE
    }
}

/// Mixed-signal block: one-shot ADC snapshot into a BRAM buffer and a DAC
/// replaying a waveform table from dual-port RAM.
pub mod miniac {
    pub const BASE: usize = super::CSR_BASE + 0x5800;
    pub const ADC_START: usize = BASE + 0x00;
    pub const ADC_DONE: usize = BASE + 0x04;
    pub const DAC_MEM_LEN: usize = BASE + 0x08;
    pub const DAC_MEM_EN: usize = BASE + 0x0c;

    pub const ADC_BUFFER: usize = 0x8100_0000;
    pub const ADC_WORDS: usize = 4096;
    /// Two 14-bit samples per word, channel 1 in the upper half.
    pub const DAC_TABLE: usize = 0x8200_0000;
    pub const DAC_SAMPLES: usize = 65;
}

/// Four-word AXI-Lite RAM whose words drive one LED each.
pub mod ledmem {
    pub const BASE: usize = 0x8300_0000;
    pub const WORDS: usize = 4;
}
