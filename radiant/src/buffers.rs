mod bind_group;
mod bindable;
mod double_buffered;
mod mapped_storage_buffer;
mod mapped_uniform_buffer;
mod readback;
mod texture;
mod unmapped_storage_buffer;
mod uploaded_buffer;
mod utils;

pub use self::bind_group::*;
pub use self::bindable::*;
pub use self::double_buffered::*;
pub use self::mapped_storage_buffer::*;
pub use self::mapped_uniform_buffer::*;
pub use self::readback::*;
pub use self::texture::*;
pub use self::unmapped_storage_buffer::*;
pub use self::uploaded_buffer::*;
