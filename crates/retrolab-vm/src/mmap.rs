//! Fixed memory-mapped addresses and interrupt/sub-code numbers, from
//! the fantasy machine's hardware contract.

pub const INT_CPU: u8 = 0;
pub const INT_KEYBOARD: u8 = 1;
pub const INT_VIDEO: u8 = 3;
pub const INT_TIMER: u8 = 4;
pub const INT_SOUND: u8 = 5;
pub const INT_FPU: u8 = 6;
pub const INT_JOYSTICK: u8 = 7;

pub const XT_TIMER_0: u16 = 0;
pub const XT_TIMER_1: u16 = 1;
pub const XT_TIMER_2: u16 = 2;
pub const XT_TIMER_3: u16 = 3;

pub const XT_CPU_IRET: u16 = 0;
pub const XT_CPU_DIVZERO: u16 = 1;
pub const XT_CPU_INVALID_OP: u16 = 2;

/// Special keys carried as the XT sub-code of `INT_KEYBOARD`.
pub const KEY_INSERT: u16 = 0xF0;
pub const KEY_HOME: u16 = 0xF1;
pub const KEY_END: u16 = 0xF2;
pub const KEY_PAGE_UP: u16 = 0xF3;
pub const KEY_PAGE_DOWN: u16 = 0xF4;
pub const KEY_RIGHT: u16 = 0xF5;
pub const KEY_LEFT: u16 = 0xF6;
pub const KEY_UP: u16 = 0xF7;
pub const KEY_DOWN: u16 = 0xF8;

pub const DEV_MEM_MGR: u8 = 0x2;

pub const MEM_CPY: u16 = 0;
pub const MEM_SET: u16 = 1;

pub const STACK_BOTTOM: u16 = 0xE2A6;
pub const JOYSTICK_STATE: u16 = 0xE2A7;

pub const TIMER_FRAME_0: u16 = 0xE2A8;
pub const TIMER_FRAME_1: u16 = 0xE2AA;
pub const TIMER_FRAME_2: u16 = 0xE2AC;
pub const TIMER_FRAME_3: u16 = 0xE2AE;

pub const CPU_VERSION_MAJOR: u16 = 0xE2B0;
pub const CPU_VERSION_MINOR: u16 = 0xE2B1;
pub const CPU_RANDOM: u16 = 0xE2B2;

// Video registers are part of the documented memory map but are
// inert: nothing in this workspace renders to them. They exist so
// that code reasoning about "top of RAM" addresses has one source of
// truth, matching `constants/mmap.h`.
pub const VIDEO_MODE: u16 = 0xE2B4;
pub const VIDEO_BORDER: u16 = 0xE2B5;
pub const VIDEO_TXT: u16 = 0xE2B6;
pub const VIDEO_TXT_COLOR: u16 = 0xE2B7;
pub const VIDEO_CURSOR_INFO: u16 = 0xE2B8;
pub const VIDEO_CURSOR_POS: u16 = 0xE2B9;
pub const VIDEO_VBLANK: u16 = 0xE2BB;
pub const VIDEO_BEAM_X: u16 = 0xE2BC;
pub const VIDEO_BEAM_Y: u16 = 0xE2BE;
pub const VIDEO_TXT_DISLOC_X: u16 = 0xE2C0;
pub const VIDEO_TXT_DISLOC_Y: u16 = 0xE2C2;
pub const VIDEO_TILE_MAP1: u16 = 0xE2C4;
pub const VIDEO_TILE_MAP2: u16 = 0xE2C6;
pub const VIDEO_SPRITE_MAP: u16 = 0xE2C8;
pub const VIDEO_TILE_DATA: u16 = 0xE2CA;
pub const VIDEO_SPRITE_DATA: u16 = 0xE2CC;

pub const PALETTE_BASE: u16 = 0xFFD0;

/// Color constants carried from `constants/mmap.h` for firmware
/// writing directly to the (inert) palette registers.
pub const COLOR_BLACK: u8 = 0x0;
pub const COLOR_WHITE: u8 = 0xF;
