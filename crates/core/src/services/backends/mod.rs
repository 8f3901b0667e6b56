#[cfg(feature = "elf-resolver")]
pub mod elf;
#[cfg(feature = "nm-resolver")]
pub mod nm;

#[cfg(feature = "elf-resolver")]
pub use elf::ElfResolver;
#[cfg(feature = "nm-resolver")]
pub use nm::NmResolver;
