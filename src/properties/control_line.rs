use bitflags::bitflags;

bitflags! {
    /// Set of modem control lines.
    ///
    /// The complement is truncated to the declared lines, so `!ALL` is
    /// empty and `!!mask == mask`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlLine: u8 {
        /// Data carrier detect.
        const DCD = 0x01;
        /// Data terminal ready.
        const DTR = 0x02;
        /// Data set ready.
        const DSR = 0x04;
        /// Request to send.
        const RTS = 0x08;
        /// Clear to send.
        const CTS = 0x10;
        /// Ring indicator.
        const RI = 0x20;
    }
}

impl ControlLine {
    pub const NONE: ControlLine = ControlLine::empty();
    pub const ALL: ControlLine = ControlLine::all();

    /// Input lines driven by the peer; readable only.
    pub const GETTABLE: ControlLine = ControlLine::DCD
        .union(ControlLine::DSR)
        .union(ControlLine::CTS)
        .union(ControlLine::RI);

    /// Output lines this end can drive.
    pub const SETTABLE: ControlLine = ControlLine::DTR.union(ControlLine::RTS);

    /// Individual lines in bit order.
    pub const LINES: [ControlLine; 6] = [
        ControlLine::DCD,
        ControlLine::DTR,
        ControlLine::DSR,
        ControlLine::RTS,
        ControlLine::CTS,
        ControlLine::RI,
    ];
}
