use core::fmt::Write;
use core::panic::PanicInfo;

use crate::bus::{Bus, VOLATILE};
use crate::hal::Uart;
use crate::soc;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let mut uart = Uart::raw(&VOLATILE);
    writeln!(uart, "\n\x1b[31;1mpanic:\x1b[0m {}", info).ok();
    // The UART FIFO drains slower than the reset kicks in
    writeln!(uart, "resetting").ok();
    writeln!(uart, "resetting").ok();

    loop {
        VOLATILE.write32(soc::ctrl::RESET, 1);
    }
}
