//! Attribute categories and the bit set that selects them.

/// One group of fields in a metadata line.
///
/// Variants are declared in emission order; the discriminant is the bit
/// position in [`MetadataMask`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Category {
    /// `F`, `D` or `L` (dead link).
    FileType = 0,
    /// `1` when the entry itself is a symbolic link.
    IsLink = 1,
    /// Canonical target of a link.
    LinkTarget = 2,
    /// Inode of a link's target.
    LinkInode = 3,
    /// Permission bits including setuid, setgid and sticky.
    UnixMode = 4,
    /// Owning user.
    Owner = 5,
    /// Owning group.
    Group = 6,
    /// Access, modification and change times.
    Timestamps = 7,
    /// Path with its parent resolved.
    CanonicalPath = 8,
    /// Path exactly as requested or visited.
    RawPath = 9,
    /// Inode number.
    Inode = 10,
    /// Size in bytes.
    Size = 11,
    /// POSIX ACL user and group entries.
    Shares = 12,
    /// Concatenated `user.annotate*` values.
    Annotations = 13,
    /// `user.checksum` and `user.checksum_type`.
    Checksum = 14,
    /// `user.sensitivity`.
    Sensitivity = 15,
    /// `user.owner`.
    ExtendedOwner = 16,
}

impl Category {
    /// Every category in emission order.
    pub const ALL: [Self; 17] = [
        Self::FileType,
        Self::IsLink,
        Self::LinkTarget,
        Self::LinkInode,
        Self::UnixMode,
        Self::Owner,
        Self::Group,
        Self::Timestamps,
        Self::CanonicalPath,
        Self::RawPath,
        Self::Inode,
        Self::Size,
        Self::Shares,
        Self::Annotations,
        Self::Checksum,
        Self::Sensitivity,
        Self::ExtendedOwner,
    ];

    /// Bit selecting this category.
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// Bit set over [`Category`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MetadataMask(u32);

const fn mask_of(categories: &[Category]) -> MetadataMask {
    let mut bits = 0;
    let mut index = 0;
    while index < categories.len() {
        bits |= categories[index].bit();
        index += 1;
    }
    MetadataMask(bits)
}

impl MetadataMask {
    /// Selects nothing. On the wire this asks for the command's default.
    pub const EMPTY: Self = Self(0);

    /// Selects every category.
    pub const ALL: Self = mask_of(&Category::ALL);

    /// Default for `list-directory` and `stat`.
    pub const LIST_DEFAULT: Self = mask_of(&[
        Category::FileType,
        Category::Timestamps,
        Category::Owner,
        Category::Group,
        Category::Size,
        Category::Shares,
        Category::Sensitivity,
        Category::IsLink,
        Category::Annotations,
        Category::Inode,
        Category::CanonicalPath,
    ]);

    /// Default for `tree`.
    pub const TREE_DEFAULT: Self = mask_of(&[
        Category::FileType,
        Category::UnixMode,
        Category::Owner,
        Category::ExtendedOwner,
        Category::Group,
        Category::Size,
        Category::Timestamps,
        Category::Inode,
        Category::Checksum,
        Category::CanonicalPath,
    ]);

    /// Mask for entries created or modified by a command.
    pub const CREATED: Self = mask_of(&[
        Category::FileType,
        Category::IsLink,
        Category::LinkTarget,
        Category::LinkInode,
        Category::UnixMode,
        Category::Owner,
        Category::Group,
        Category::Timestamps,
        Category::CanonicalPath,
        Category::Inode,
        Category::Size,
        Category::Annotations,
        Category::Checksum,
        Category::Sensitivity,
        Category::ExtendedOwner,
    ]);

    /// Mask for entries reported by `move`.
    pub const MOVED: Self = mask_of(&[
        Category::FileType,
        Category::Owner,
        Category::CanonicalPath,
        Category::Inode,
    ]);

    /// Mask for entries removed by `delete`.
    pub const DELETED: Self = mask_of(&[
        Category::FileType,
        Category::Owner,
        Category::Group,
        Category::CanonicalPath,
        Category::Inode,
    ]);

    /// Builds a mask from wire bits. Unknown bits are dropped.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` when no category is selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` when `category` is selected.
    #[must_use]
    pub const fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    /// Returns `default` when this mask is empty, otherwise `self`.
    #[must_use]
    pub const fn or_default(self, default: Self) -> Self {
        if self.is_empty() { default } else { self }
    }

    /// Adds `category`.
    #[must_use]
    pub const fn with(self, category: Category) -> Self {
        Self(self.0 | category.bit())
    }

    /// Selected categories in emission order.
    pub fn categories(self) -> impl Iterator<Item = Category> {
        Category::ALL
            .into_iter()
            .filter(move |category| self.contains(*category))
    }
}
