mod arena;
mod cpu;
mod shaders;
mod sort;
