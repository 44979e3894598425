//! Built-in demo catalog.
//!
//! Shown while the database holds no active products. Demo products have
//! `demo-` IDs, are never written to remote cart or wishlist tables and can
//! be copied into the database with `akf-cli seed demo`.

use akf_core::{Money, ProductKey};

use crate::models::{
    ColorSwatch, ColorVariant, Product, ProductDetail, ProductDraft, ProductSummary, SizeStock,
};

/// Directory the variant photos are served from.
const IMAGE_ROOT: &str = "/static/images/products";

/// Number of other demo products suggested on a demo product page.
const RELATED_LIMIT: usize = 4;

/// Sarees and dress materials are unsized; seeded stock goes here.
const FREE_SIZE: &str = "Free Size";

pub struct DemoVariant {
    pub id: &'static str,
    pub name: &'static str,
    pub hex_code: &'static str,
    pub image: &'static str,
}

impl DemoVariant {
    fn image_url(&self) -> String {
        format!("{IMAGE_ROOT}/{}", self.image)
    }

    fn to_variant(&self) -> ColorVariant {
        ColorVariant {
            id: self.id.to_owned(),
            name: self.name.to_owned(),
            hex_code: self.hex_code.to_owned(),
            image: self.image_url(),
        }
    }
}

pub struct DemoProduct {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: u32,
    pub original_price: u32,
    pub category: &'static str,
    pub stock_quantity: u32,
    /// The first variant's photo doubles as the product image.
    pub variants: &'static [DemoVariant],
}

impl DemoProduct {
    #[must_use]
    pub fn key(&self) -> ProductKey {
        ProductKey::Demo(self.slug.to_owned())
    }

    #[must_use]
    pub fn image_url(&self) -> Option<String> {
        self.variants.first().map(DemoVariant::image_url)
    }

    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            key: self.key(),
            name: self.name.to_owned(),
            price: Money::from_rupees(self.price),
            original_price: Some(Money::from_rupees(self.original_price)),
            image_url: self.image_url(),
            category: self.category.to_owned(),
            is_featured: true,
            created_at: None,
        }
    }

    #[must_use]
    pub fn color_variants(&self) -> Vec<ColorVariant> {
        self.variants.iter().map(DemoVariant::to_variant).collect()
    }

    #[must_use]
    pub fn variant(&self, id: &str) -> Option<ColorVariant> {
        self.variants
            .iter()
            .find(|v| v.id == id)
            .map(DemoVariant::to_variant)
    }

    #[must_use]
    pub fn detail(&self) -> ProductDetail {
        ProductDetail {
            product: Product {
                summary: self.summary(),
                description: Some(self.description.to_owned()),
                stock_quantity: self.stock_quantity,
                is_active: true,
            },
            color_variants: self.color_variants(),
            colors: Vec::new(),
            sizes: Vec::new(),
            images: Vec::new(),
            related: DEMO_PRODUCTS
                .iter()
                .filter(|p| p.slug != self.slug)
                .take(RELATED_LIMIT)
                .map(Self::summary)
                .collect(),
        }
    }

    /// The product as an admin draft, for seeding the database.
    #[must_use]
    pub fn draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.to_owned(),
            description: Some(self.description.to_owned()),
            price: Money::from_rupees(self.price),
            original_price: Some(Money::from_rupees(self.original_price)),
            category: self.category.to_owned(),
            image_url: self.image_url(),
            is_active: true,
            is_featured: true,
            sizes: vec![SizeStock {
                size: FREE_SIZE.to_owned(),
                stock_quantity: self.stock_quantity,
            }],
            colors: self
                .variants
                .iter()
                .map(|v| ColorSwatch {
                    name: v.name.to_owned(),
                    hex_code: v.hex_code.to_owned(),
                })
                .collect(),
            images: self.variants.iter().map(DemoVariant::image_url).collect(),
        }
    }
}

/// Look up a demo product by its `demo-` slug.
#[must_use]
pub fn find(slug: &str) -> Option<&'static DemoProduct> {
    DEMO_PRODUCTS.iter().find(|p| p.slug == slug)
}

/// Summaries of every demo product in catalog order.
#[must_use]
pub fn summaries() -> Vec<ProductSummary> {
    DEMO_PRODUCTS.iter().map(DemoProduct::summary).collect()
}

#[must_use]
pub fn all() -> &'static [DemoProduct] {
    DEMO_PRODUCTS
}

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        slug: "demo-cotton-dupatta-dress",
        name: "Cotton Embroidered Dupatta Dress",
        description: "It's a cotton dress with embroidery work along with Kundan on it available \
            with large embroidered dupatta. Available in stunning colors - Blush Pink, Sage Green, \
            and Silver Gray.",
        price: 900,
        original_price: 1100,
        category: "Dress Material",
        stock_quantity: 20,
        variants: &[
            DemoVariant { id: "blush-pink", name: "Blush Pink", hex_code: "#DE5D83", image: "dupatta-blush-pink.jpeg" },
            DemoVariant { id: "sage-green", name: "Sage Green", hex_code: "#9DC183", image: "dupatta-sage-green.jpeg" },
            DemoVariant { id: "silver-gray", name: "Silver Gray", hex_code: "#C0C0C0", image: "dupatta-silver-gray.jpeg" },
        ],
    },
    DemoProduct {
        slug: "demo-gini-cloth-saree",
        name: "Gini Cloth Saree",
        description: "This is a gini cloth saree with smooth silk fabric beautiful stunning work \
            all over the saree as shown in this image. Available in stunning colors - Mustard \
            Orange, Teal Blue, and Wine Purple.",
        price: 1500,
        original_price: 1700,
        category: "Designer Saree",
        stock_quantity: 20,
        variants: &[
            DemoVariant { id: "mustard-orange", name: "Mustard Orange", hex_code: "#FF8C00", image: "gini-mustard-orange.jpeg" },
            DemoVariant { id: "teal-blue", name: "Teal Blue", hex_code: "#008080", image: "gini-teal-blue.jpeg" },
            DemoVariant { id: "wine-purple", name: "Wine Purple", hex_code: "#722F37", image: "gini-wine-purple.jpeg" },
        ],
    },
    DemoProduct {
        slug: "demo-kundan-georgette-dress",
        name: "Kundan Georgette Dress",
        description: "It's a pure georgette dress with embroidery work along with Kundan on it \
            and also dupatta designed with border work. Available in stunning colors - Pink, \
            Dark Green, Light Green, and Violet.",
        price: 2899,
        original_price: 3999,
        category: "Dress Material",
        stock_quantity: 20,
        variants: &[
            DemoVariant { id: "pink", name: "Pink", hex_code: "#FFC0CB", image: "kundan-pink.jpeg" },
            DemoVariant { id: "sea-green", name: "Sea Green", hex_code: "#2E8B57", image: "kundan-dark-green.jpeg" },
            DemoVariant { id: "teal-green", name: "Teal Green", hex_code: "#008080", image: "kundan-light-green.jpeg" },
            DemoVariant { id: "violet", name: "Violet", hex_code: "#8B008B", image: "kundan-violet.jpeg" },
        ],
    },
    DemoProduct {
        slug: "demo-floral-georgette-saree",
        name: "Floral Georgette Saree",
        description: "Pure georgette saree with work on border and all saree printed with \
            beautiful floral design. Available in stunning colors - Silver, Brown, and Light Green.",
        price: 1800,
        original_price: 2100,
        category: "Designer Saree",
        stock_quantity: 20,
        variants: &[
            DemoVariant { id: "silver", name: "Silver", hex_code: "#C0C0C0", image: "floral-silver.jpeg" },
            DemoVariant { id: "brown", name: "Brown", hex_code: "#8B4513", image: "floral-brown.jpeg" },
            DemoVariant { id: "light-green", name: "Light Green", hex_code: "#90EE90", image: "floral-light-green.jpeg" },
        ],
    },
    DemoProduct {
        slug: "demo-pattu-silk-saree",
        name: "Pattu Silk Saree with Shiny Thread",
        description: "Silk saree with shiny thread all over the saree and pallu. We also have \
            stunning colors in this saree - Red, Leaf Green, Mustard Yellow, and Teal Green. \
            Perfect for weddings, festivals, and special occasions.",
        price: 900,
        original_price: 1400,
        category: "Designer Saree",
        stock_quantity: 25,
        variants: &[
            DemoVariant { id: "red", name: "Red", hex_code: "#B22234", image: "pattu-red.jpeg" },
            DemoVariant { id: "leaf-green", name: "Leaf Green", hex_code: "#4A7C4E", image: "pattu-leaf-green.jpeg" },
            DemoVariant { id: "mustard-yellow", name: "Mustard Yellow", hex_code: "#FFDB58", image: "pattu-mustard-yellow.jpeg" },
            DemoVariant { id: "teal-green", name: "Teal Green", hex_code: "#008080", image: "pattu-teal-green.jpeg" },
        ],
    },
    DemoProduct {
        slug: "demo-bandhani-saree",
        name: "Bandhani Saree with Smooth Finish",
        description: "Bandhani saree with smooth finishing cloth as shown. Also available in \
            different colors - Green, Red, Sky Blue, Pink, Orange, and Rust. Each piece showcases \
            authentic Bandhani tie-dye patterns with premium quality fabric. Perfect for daily \
            wear, casual occasions, and festive celebrations.",
        price: 900,
        original_price: 1400,
        category: "Daily Wear",
        stock_quantity: 30,
        variants: &[
            DemoVariant { id: "green", name: "Green", hex_code: "#4A7C4E", image: "bandhani-green.jpeg" },
            DemoVariant { id: "red", name: "Red", hex_code: "#B22234", image: "bandhani-red.jpeg" },
            DemoVariant { id: "blue", name: "Sky Blue", hex_code: "#00A3CC", image: "bandhani-blue.jpeg" },
            DemoVariant { id: "pink", name: "Pink", hex_code: "#C71585", image: "bandhani-pink.jpeg" },
            DemoVariant { id: "orange", name: "Orange", hex_code: "#FF8C00", image: "bandhani-orange.jpeg" },
            DemoVariant { id: "rust", name: "Rust", hex_code: "#B7410E", image: "bandhani-rust.jpeg" },
        ],
    },
    DemoProduct {
        slug: "demo-banarasi-saree",
        name: "Banarasi Silk Saree with Zari Work",
        description: "Exquisite Banarasi silk saree featuring intricate zari work and traditional \
            motifs. This luxurious saree is perfect for weddings, festivals, and special \
            celebrations. Made with premium quality silk with rich golden borders and pallu. \
            Available in 4 stunning colors - Teal Blue, Dusty Mauve, Lavender Purple, and Mint \
            Green. Each piece is handcrafted with attention to detail, showcasing the finest \
            Banarasi weaving traditions.",
        price: 1500,
        original_price: 1800,
        category: "Designer Saree",
        stock_quantity: 25,
        variants: &[
            DemoVariant { id: "teal", name: "Teal Blue", hex_code: "#008080", image: "banarasi-teal.jpeg" },
            DemoVariant { id: "mauve", name: "Dusty Mauve", hex_code: "#B4838D", image: "banarasi-mauve.jpeg" },
            DemoVariant { id: "lavender", name: "Lavender Purple", hex_code: "#9683B8", image: "banarasi-lavender.jpeg" },
            DemoVariant { id: "mint", name: "Mint Green", hex_code: "#7EBDB4", image: "banarasi-mint.jpeg" },
        ],
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_slug_is_a_demo_key() {
        for product in all() {
            assert!(ProductKey::parse(product.slug).unwrap().is_demo());
            assert!(!product.variants.is_empty());
        }
        assert_eq!(all().len(), 7);
    }

    #[test]
    fn test_product_image_is_first_variant() {
        let banarasi = find("demo-banarasi-saree").unwrap();
        assert_eq!(
            banarasi.image_url().as_deref(),
            Some("/static/images/products/banarasi-teal.jpeg")
        );
        assert_eq!(banarasi.summary().discount_percent(), Some(17));
    }

    #[test]
    fn test_related_excludes_self() {
        let detail = find("demo-gini-cloth-saree").unwrap().detail();
        assert_eq!(detail.related.len(), 4);
        assert!(detail.related.iter().all(|p| p.name != "Gini Cloth Saree"));
        assert_eq!(detail.color_variants.len(), 3);
    }

    #[test]
    fn test_draft_copies_variants_as_colours() {
        let draft = find("demo-bandhani-saree").unwrap().draft();
        assert_eq!(draft.colors.len(), 6);
        assert_eq!(draft.images.len(), 6);
        assert_eq!(draft.stock_quantity(), 30);
        assert_eq!(draft.sizes[0].size, "Free Size");
    }
}
